use std::sync::Arc;

use tracing::{info, instrument};

use crate::models::{MenuItem, MenuItemPatch, NewMenuItem, ServiceError, ServiceResult, Session};
use crate::stores::{Collection, DocumentStore, ListFilter};

use super::{ensure_staff, from_document, to_document};

/// Access to the menu. Reads are open to everyone; every mutation requires
/// a verified staff-role session.
#[derive(Clone)]
pub struct MenuRepository {
    store: Arc<dyn DocumentStore>,
}

impl MenuRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, session: &Session, request: NewMenuItem) -> ServiceResult<MenuItem> {
        ensure_staff(self.store.as_ref(), session).await?;
        validate_name(&request.name)?;
        validate_price(&request.price)?;

        let id = self.store.generate_id(Collection::MenuItems);
        let item = MenuItem::from_new(id.clone(), request);
        let doc = to_document(&item)?;
        self.store
            .put(Collection::MenuItems, Some(id), doc)
            .await?;

        info!("menu item created");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ServiceResult<Option<MenuItem>> {
        match self.store.get(Collection::MenuItems, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, available_only: bool) -> ServiceResult<Vec<MenuItem>> {
        let filter = available_only.then(|| ListFilter::field_equals("available", true));
        let docs = self.store.list(Collection::MenuItems, filter).await?;
        docs.into_iter()
            .map(|doc| Ok(from_document(doc)?))
            .collect()
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        session: &Session,
        id: &str,
        patch: MenuItemPatch,
    ) -> ServiceResult<()> {
        ensure_staff(self.store.as_ref(), session).await?;
        if let Some(ref name) = patch.name {
            validate_name(name)?;
        }
        if let Some(ref price) = patch.price {
            validate_price(price)?;
        }

        let patch_doc = to_document(&patch)?;
        self.store
            .update(Collection::MenuItems, id, patch_doc)
            .await?;
        Ok(())
    }

    /// Hard delete, no tombstone.
    #[instrument(skip(self))]
    pub async fn delete(&self, session: &Session, id: &str) -> ServiceResult<()> {
        ensure_staff(self.store.as_ref(), session).await?;
        self.store.delete(Collection::MenuItems, id).await?;
        info!("menu item deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation {
            message: "menu item name cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_price(price: &rust_decimal::Decimal) -> ServiceResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ServiceError::Validation {
            message: format!("menu item price cannot be negative: {}", price),
        });
    }
    Ok(())
}
