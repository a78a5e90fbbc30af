use crate::catalog::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    ToggleProduct { product_id: ProductId },
    GenerateRoutine,
}

impl UiAction {
    pub fn to_log_line(&self) -> String {
        match self {
            Self::ToggleProduct { product_id } => format!("toggle_product product_id={product_id}"),
            Self::GenerateRoutine => "generate_routine".to_string(),
        }
    }
}
