//! # CLI Command Implementations

use crate::api;
use crate::config::AppConfig;
use badgetrack_core::{Role, Store, Tracker, TrackerError};

/// Open the tracker described by `config`.
pub fn open_tracker(config: &AppConfig) -> Result<Tracker, TrackerError> {
    Tracker::open(&config.database, config.tracker_config())
}

fn print_json(value: &serde_json::Value) -> Result<(), TrackerError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| TrackerError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: &AppConfig) -> Result<(), TrackerError> {
    let tracker = open_tracker(config)?;
    if tracker.super_admin()?.is_none() {
        tracing::warn!(
            event = "super_admin_missing",
            email = %config.super_admin_email,
            "No super-admin account yet; run `badgetrack init` first"
        );
    }

    println!("Badgetrack Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:     {}", config.addr());
    println!("  Database:    {:?}", config.database);
    let settings = tracker.config();
    println!("  Super admin: {}", settings.super_admin_email);
    println!("  Sessions:    {}h", settings.session_ttl_hours);
    println!("  Invitations: {}h", settings.invitation_ttl_hours);
    if config.rate_limit == 0 {
        println!("  Rate limit:  disabled");
    } else {
        println!("  Rate limit:  {} req/s", config.rate_limit);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.addr(), tracker, &config.http_config()).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the super-admin account, or reset its password.
pub fn cmd_init(
    config: &AppConfig,
    name: &str,
    password: &str,
    json_mode: bool,
) -> Result<(), TrackerError> {
    let mut tracker = open_tracker(config)?;
    let existed = tracker.super_admin()?.is_some();
    let user = tracker.bootstrap_super_admin(name, password)?;
    tracing::info!(
        event = "super_admin_bootstrap",
        user_id = user.id.0,
        existed,
        "Super-admin account ready"
    );

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "id": user.id.0,
            "email": user.email,
            "created": !existed,
        }));
    }

    if existed {
        println!("Reset super-admin account {} (id {})", user.email, user.id.0);
    } else {
        println!("Created super-admin account {} (id {})", user.email, user.id.0);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document counts.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), TrackerError> {
    let tracker = open_tracker(config)?;
    let counts = tracker.store().counts()?;
    let super_admin = tracker.super_admin()?.is_some();

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "super_admin": super_admin,
            "users": counts.users,
            "badges": counts.badges,
            "categories": counts.categories,
            "submissions": counts.submissions,
            "invitations": counts.invitations,
            "sessions": counts.sessions,
        }));
    }

    println!("Badgetrack Status");
    println!("=================");
    println!("Database:    {:?}", config.database);
    println!("Super admin: {}", if super_admin { "present" } else { "missing" });
    println!();
    println!("Users:       {}", counts.users);
    println!("Badges:      {}", counts.badges);
    println!("Categories:  {}", counts.categories);
    println!("Submissions: {}", counts.submissions);
    println!("Invitations: {}", counts.invitations);
    println!("Sessions:    {}", counts.sessions);
    Ok(())
}

// =============================================================================
// LISTING COMMANDS
// =============================================================================

/// List user accounts, optionally filtered by role.
pub fn cmd_users(
    config: &AppConfig,
    role: Option<Role>,
    json_mode: bool,
) -> Result<(), TrackerError> {
    let tracker = open_tracker(config)?;
    let users: Vec<_> = tracker
        .store()
        .list_users()?
        .into_iter()
        .filter(|u| role.is_none_or(|r| u.role == r))
        .collect();

    if json_mode {
        let rows: Vec<_> = users
            .iter()
            .map(|u| {
                serde_json::json!({
                    "id": u.id.0,
                    "name": u.name,
                    "email": u.email,
                    "role": u.role,
                    "superAdmin": tracker.policy().is_super_admin(&u.email),
                })
            })
            .collect();
        return print_json(&serde_json::Value::Array(rows));
    }

    if users.is_empty() {
        println!("No users");
        return Ok(());
    }
    for user in &users {
        let marker = if tracker.policy().is_super_admin(&user.email) {
            " (super admin)"
        } else {
            ""
        };
        println!(
            "{:>5}  {:<8} {} <{}>{}",
            user.id.0, user.role, user.name, user.email, marker
        );
    }
    Ok(())
}

/// List categories with their badge counts.
pub fn cmd_categories(config: &AppConfig, json_mode: bool) -> Result<(), TrackerError> {
    let tracker = open_tracker(config)?;
    let summaries = tracker.list_categories()?;

    if json_mode {
        let rows: Vec<_> = summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.category.id.0,
                    "name": s.category.name,
                    "color": s.category.color,
                    "badgeCount": s.badge_count,
                })
            })
            .collect();
        return print_json(&serde_json::Value::Array(rows));
    }

    if summaries.is_empty() {
        println!("No categories");
        return Ok(());
    }
    for summary in &summaries {
        println!(
            "{:>5}  {} {} ({} badges)",
            summary.category.id.0,
            summary.category.color,
            summary.category.name,
            summary.badge_count
        );
    }
    Ok(())
}

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Compact the database file in place.
pub fn cmd_compact(config: &AppConfig) -> Result<(), TrackerError> {
    let mut store = Store::open(&config.database)?;
    store.compact()?;
    println!("Compacted {:?}", config.database);
    Ok(())
}
