//! Category repository for database operations.
//!
//! Categories form a two-level hierarchy per user: roots and their children.
//! A child can never be a parent, and the (name, parent) pair is unique
//! within a user's tree.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use centime_core::category::default_category_tree;

use crate::entities::{categories, expenses, incomes, sea_orm_active_enums::CategoryType};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found or not owned by the caller.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Parent category not found or not owned by the caller.
    #[error("Parent category not found: {0}")]
    ParentNotFound(Uuid),

    /// Parent already has a parent itself.
    #[error("Categories cannot nest more than two levels")]
    NestingTooDeep,

    /// Category set as its own parent.
    #[error("Category cannot be its own parent")]
    SelfParent,

    /// Parent is a child of the category being updated.
    #[error("Cannot use a child category as parent")]
    ChildAsParent,

    /// Same name already exists under the same parent.
    #[error("Category '{0}' already exists")]
    Duplicate(String),

    /// Cannot delete a category that entries still reference.
    #[error("Cannot delete category: {0} entries reference it")]
    InUse(u64),

    /// Cannot delete a category that still has children.
    #[error("Cannot delete category: it has {0} child categories")]
    HasChildren(u64),

    /// Default import refused because the user already has categories.
    #[error("Cannot import defaults: {0} categories already exist")]
    DefaultsNotEmpty(u64),

    /// Embedded default tree failed to parse.
    #[error("Default category asset is invalid: {0}")]
    InvalidAsset(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Category name.
    pub name: String,
    /// Whether the category classifies expenses or incomes.
    pub category_type: CategoryType,
    /// Parent category for second-level categories.
    pub parent_id: Option<Uuid>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New parent (outer `None` keeps the current parent, inner `None`
    /// detaches the category into a root).
    pub parent_id: Option<Option<Uuid>>,
}

/// A category with its parent and children attached.
#[derive(Debug, Clone)]
pub struct CategoryWithRelations {
    /// The category itself.
    pub category: categories::Model,
    /// Parent category, if this is a second-level category.
    pub parent: Option<categories::Model>,
    /// Child categories ordered by name.
    pub children: Vec<categories::Model>,
}

/// Category repository for CRUD operations and the default import.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category with hierarchy and duplicate validation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent does not exist or is not owned by the user
    /// - The parent is itself a child (two-level limit)
    /// - The (name, parent) pair already exists for the user
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryWithRelations, CategoryError> {
        let parent = match input.parent_id {
            Some(parent_id) => Some(self.resolve_parent(input.user_id, parent_id).await?),
            None => None,
        };

        if self
            .name_taken(input.user_id, &input.name, input.parent_id, None)
            .await?
        {
            return Err(CategoryError::Duplicate(input.name));
        }

        let now = chrono::Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(input.name),
            category_type: Set(input.category_type),
            parent_id: Set(input.parent_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let category = category.insert(&self.db).await?;

        Ok(CategoryWithRelations {
            category,
            parent,
            children: Vec::new(),
        })
    }

    /// Lists all categories for a user, each with parent and children
    /// attached. Roots come first, then children grouped under their
    /// parents, name-ordered throughout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategoryWithRelations>, CategoryError> {
        let mut all = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;

        // Option<Uuid> orders None first, so roots lead.
        all.sort_by(|a, b| {
            a.parent_id
                .cmp(&b.parent_id)
                .then_with(|| a.name.cmp(&b.name))
        });

        let by_id: HashMap<Uuid, categories::Model> =
            all.iter().map(|c| (c.id, c.clone())).collect();

        let mut children_of: HashMap<Uuid, Vec<categories::Model>> = HashMap::new();
        for category in &all {
            if let Some(parent_id) = category.parent_id {
                children_of
                    .entry(parent_id)
                    .or_default()
                    .push(category.clone());
            }
        }
        for children in children_of.values_mut() {
            children.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(all
            .into_iter()
            .map(|category| {
                let parent = category.parent_id.and_then(|pid| by_id.get(&pid).cloned());
                let children = children_of.get(&category.id).cloned().unwrap_or_default();
                CategoryWithRelations {
                    category,
                    parent,
                    children,
                }
            })
            .collect())
    }

    /// Finds one category owned by the user, with parent and children.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an absent or foreign-owned category.
    pub async fn find_category(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<CategoryWithRelations, CategoryError> {
        let category = self.owned_category(user_id, id).await?;
        self.with_relations(category).await
    }

    /// Updates a category with hierarchy and duplicate validation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The category does not exist or is not owned by the user
    /// - The new parent is the category itself, a child of it, absent, or
    ///   itself a child
    /// - The resulting (name, parent) pair collides with another category
    pub async fn update_category(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryWithRelations, CategoryError> {
        let category = self.owned_category(user_id, id).await?;

        if let Some(Some(new_parent_id)) = input.parent_id {
            if new_parent_id == id {
                return Err(CategoryError::SelfParent);
            }

            // Checked before the depth rule so reparenting under one's own
            // child reports the cycle rather than the nesting limit.
            let is_own_child = categories::Entity::find()
                .filter(categories::Column::Id.eq(new_parent_id))
                .filter(categories::Column::ParentId.eq(id))
                .one(&self.db)
                .await?
                .is_some();
            if is_own_child {
                return Err(CategoryError::ChildAsParent);
            }

            self.resolve_parent(user_id, new_parent_id).await?;
        }

        let name_to_check = input.name.clone().unwrap_or_else(|| category.name.clone());
        let parent_to_check = input.parent_id.unwrap_or(category.parent_id);

        if (name_to_check != category.name || parent_to_check != category.parent_id)
            && self
                .name_taken(user_id, &name_to_check, parent_to_check, Some(id))
                .await?
        {
            return Err(CategoryError::Duplicate(name_to_check));
        }

        let now = chrono::Utc::now().into();
        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        active.updated_at = Set(now);

        let updated = active.update(&self.db).await?;
        self.with_relations(updated).await
    }

    /// Deletes a category that nothing references.
    ///
    /// # Errors
    ///
    /// Returns an error if the category has expenses or incomes booked
    /// against it, or still has children.
    pub async fn delete_category(&self, user_id: Uuid, id: Uuid) -> Result<(), CategoryError> {
        let category = self.owned_category(user_id, id).await?;

        let expense_count = expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        let income_count = incomes::Entity::find()
            .filter(incomes::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if expense_count + income_count > 0 {
            return Err(CategoryError::InUse(expense_count + income_count));
        }

        let child_count = categories::Entity::find()
            .filter(categories::Column::ParentId.eq(id))
            .count(&self.db)
            .await?;
        if child_count > 0 {
            return Err(CategoryError::HasChildren(child_count));
        }

        categories::Entity::delete_by_id(category.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Materializes the embedded default tree for a user with no
    /// categories yet. Returns the number of top-level groups created.
    ///
    /// # Errors
    ///
    /// Returns `DefaultsNotEmpty` if the user already has any categories.
    pub async fn import_defaults(&self, user_id: Uuid) -> Result<u64, CategoryError> {
        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(CategoryError::DefaultsNotEmpty(existing));
        }

        self.seed_defaults(user_id).await
    }

    /// Inserts the embedded default tree for a user without any guard.
    /// Used at registration, where the user is known to be fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset fails to parse or an insert fails.
    pub async fn seed_defaults(&self, user_id: Uuid) -> Result<u64, CategoryError> {
        let tree = default_category_tree()?;
        let now = chrono::Utc::now().into();

        let txn = self.db.begin().await?;

        let mut group_count: u64 = 0;
        let kinds = [
            (CategoryType::Expense, &tree.expense),
            (CategoryType::Income, &tree.income),
        ];
        for (kind, groups) in kinds {
            for group in groups {
                group_count += 1;
                let parent_id = Uuid::new_v4();
                let parent = categories::ActiveModel {
                    id: Set(parent_id),
                    user_id: Set(user_id),
                    name: Set(group.name.clone()),
                    category_type: Set(kind.clone()),
                    parent_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                parent.insert(&txn).await?;

                for child_name in &group.children {
                    let child = categories::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        name: Set(child_name.clone()),
                        category_type: Set(kind.clone()),
                        parent_id: Set(Some(parent_id)),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    child.insert(&txn).await?;
                }
            }
        }

        txn.commit().await?;

        Ok(group_count)
    }

    /// Finds a category by id and owner, without relations.
    async fn owned_category(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<categories::Model, CategoryError> {
        categories::Entity::find()
            .filter(categories::Column::Id.eq(id))
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    /// Resolves a parent candidate: it must be owned and must be a root.
    async fn resolve_parent(
        &self,
        user_id: Uuid,
        parent_id: Uuid,
    ) -> Result<categories::Model, CategoryError> {
        let parent = categories::Entity::find()
            .filter(categories::Column::Id.eq(parent_id))
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::ParentNotFound(parent_id))?;

        if parent.parent_id.is_some() {
            return Err(CategoryError::NestingTooDeep);
        }

        Ok(parent)
    }

    /// Checks whether the (name, parent) pair is already taken for the
    /// user, optionally excluding one category id.
    async fn name_taken(
        &self,
        user_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> Result<bool, CategoryError> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name));

        query = match parent_id {
            Some(pid) => query.filter(categories::Column::ParentId.eq(pid)),
            None => query.filter(categories::Column::ParentId.is_null()),
        };

        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    /// Attaches parent and children to a category model.
    async fn with_relations(
        &self,
        category: categories::Model,
    ) -> Result<CategoryWithRelations, CategoryError> {
        let parent = match category.parent_id {
            Some(parent_id) => {
                categories::Entity::find_by_id(parent_id)
                    .one(&self.db)
                    .await?
            }
            None => None,
        };

        let children = categories::Entity::find()
            .filter(categories::Column::ParentId.eq(category.id))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;

        Ok(CategoryWithRelations {
            category,
            parent,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tree_has_both_kinds() {
        let tree = default_category_tree().unwrap();
        assert!(!tree.expense.is_empty());
        assert!(!tree.income.is_empty());
        assert_eq!(tree.group_count(), 19);
    }
}
