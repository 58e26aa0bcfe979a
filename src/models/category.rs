use serde::Serialize;

/// Display name used when an expense points at a category id the registry does not know.
pub const UNKNOWN_CATEGORY_NAME: &str = "Unknown";
pub const UNKNOWN_CATEGORY_COLOR: &str = "#e5e7eb";
pub const UNKNOWN_CATEGORY_EMOJI: &str = "❔";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub color: String,
}

impl Category {
    pub fn new(id: &str, name: &str, emoji: &str, color: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: emoji.into(),
            color: color.into(),
        }
    }

    pub fn option_label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

/// Resolved display metadata. Always available, even for unknown ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDisplay {
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub known: bool,
}

impl CategoryDisplay {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN_CATEGORY_NAME.into(),
            emoji: UNKNOWN_CATEGORY_EMOJI.into(),
            color: UNKNOWN_CATEGORY_COLOR.into(),
            known: false,
        }
    }
}

impl From<&Category> for CategoryDisplay {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            emoji: category.emoji.clone(),
            color: category.color.clone(),
            known: true,
        }
    }
}

/// Read-only category reference data, in display order.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Category::new("food", "Food", "🍔", "#f97316"),
            Category::new("coffee", "Coffee", "☕", "#a16207"),
            Category::new("travel", "Travel", "🚕", "#0ea5e9"),
            Category::new("shopping", "Shopping", "🛍️", "#d946ef"),
        ])
    }

    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn lookup(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Total lookup: unknown ids resolve to the "Unknown" fallback record.
    pub fn resolve(&self, id: &str) -> CategoryDisplay {
        self.lookup(id)
            .map(CategoryDisplay::from)
            .unwrap_or_else(CategoryDisplay::unknown)
    }

    /// Id preselected in the add form.
    pub fn default_id(&self) -> Option<&str> {
        self.categories.first().map(|c| c.id.as_str())
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
