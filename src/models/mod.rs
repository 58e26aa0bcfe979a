pub mod category;
pub mod expense;

pub use category::{Category, CategoryDisplay, CategoryRegistry};
pub use expense::{Expense, ExpenseDraft, NewExpense};
