use crate::catalog::{CatalogError, Product};
use crate::chat::transport::{ChatError, ChatResponse};

#[derive(Debug, Clone)]
pub enum AppEvent {
    CatalogLoaded(Result<Vec<Product>, CatalogError>),
    ChatCompleted(Result<ChatResponse, ChatError>),
}
