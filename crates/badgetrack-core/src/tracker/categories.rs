//! Category CRUD, including the rename cascade onto badges.

use super::{Tracker, now, validate};
use crate::cascade::{BadgeCategoryIndex, CascadeReport, propagate_rename};
use crate::policy::Actor;
use crate::primitives::{DEFAULT_CATEGORY_COLOR, MAX_NAME_LENGTH, MAX_TEXT_LENGTH};
use crate::{Category, CategoryId, TrackerError};

/// A category with the number of badges filed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: Category,
    pub badge_count: usize,
}

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// Partial edit. `update_badges` only matters when the name changes.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub update_badges: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryUpdateOutcome {
    pub category: Category,
    /// Present when a rename was cascaded onto badges.
    pub cascade: Option<CascadeReport>,
}

impl Tracker {
    fn load_category(&self, id: CategoryId) -> Result<Category, TrackerError> {
        self.store
            .get_category(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("Category {}", id.0)))
    }

    /// Every category with its badge count, sorted by name.
    pub fn list_categories(&self) -> Result<Vec<CategorySummary>, TrackerError> {
        let badges = self.store.list_badges()?;
        let mut summaries: Vec<CategorySummary> = self
            .store
            .list_categories()?
            .into_iter()
            .map(|category| CategorySummary {
                badge_count: badges.iter().filter(|b| b.category == category.name).count(),
                category,
            })
            .collect();
        summaries.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(summaries)
    }

    pub fn create_category(
        &mut self,
        actor: &Actor,
        input: CategoryInput,
    ) -> Result<Category, TrackerError> {
        self.policy.require_staff(actor, "create categories")?;
        let color = match input.color.as_deref() {
            Some(c) => validate::color(c)?,
            None => DEFAULT_CATEGORY_COLOR.to_string(),
        };
        self.store.insert_category(Category {
            id: CategoryId(0),
            name: validate::required_text("name", &input.name, MAX_NAME_LENGTH)?,
            color,
            description: validate::optional_text(
                "description",
                input.description.as_deref(),
                MAX_TEXT_LENGTH,
            )?,
            created_at: now(),
        })
    }

    /// Edit a category. Admins only.
    ///
    /// The category document is saved first. If the name changed and
    /// `update_badges` is set, badges are then moved over best effort; the
    /// rename stands even when some badges could not be moved.
    pub fn update_category(
        &mut self,
        actor: &Actor,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<CategoryUpdateOutcome, TrackerError> {
        self.policy.require_admin(actor, "manage categories")?;
        let mut category = self.load_category(id)?;
        let old_name = category.name.clone();

        if let Some(name) = update.name.as_deref() {
            category.name = validate::required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(color) = update.color.as_deref() {
            category.color = validate::color(color)?;
        }
        if let Some(description) = update.description.as_deref() {
            category.description =
                validate::optional_text("description", Some(description), MAX_TEXT_LENGTH)?;
        }
        self.store.update_category(&category)?;

        let cascade = if update.update_badges && category.name != old_name {
            Some(propagate_rename(&mut self.store, &old_name, &category.name)?)
        } else {
            None
        };
        Ok(CategoryUpdateOutcome { category, cascade })
    }

    /// Delete a category no badge refers to. Admins only.
    pub fn delete_category(
        &mut self,
        actor: &Actor,
        id: CategoryId,
    ) -> Result<Category, TrackerError> {
        self.policy.require_admin(actor, "manage categories")?;
        let category = self.load_category(id)?;
        let in_use = self.store.count_in_category(&category.name)?;
        if in_use > 0 {
            return Err(TrackerError::Conflict(format!(
                "Category '{}' is used by {} badge(s)",
                category.name, in_use
            )));
        }
        self.store.delete_category(id)?;
        Ok(category)
    }
}
