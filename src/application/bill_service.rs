use chrono::NaiveDate;
use uuid::Uuid;

use crate::billing::share::{bill_message, decode_image_data_url, share_link};
use crate::domain::errors::DomainError;
use crate::domain::ports::{BillImageStore, CustomerRepository, StoredImage};

#[derive(Debug, Clone)]
pub struct SharedBill {
    pub url: String,
    pub share_link: String,
}

/// Publishes rendered bills and builds the WhatsApp link for them.
pub struct BillService<S, C> {
    store: S,
    customers: C,
}

impl<S: BillImageStore, C: CustomerRepository> BillService<S, C> {
    pub fn new(store: S, customers: C) -> Self {
        Self { store, customers }
    }

    pub fn upload_image(&self, data_url: &str) -> Result<StoredImage, DomainError> {
        let (bytes, extension) = decode_image_data_url(data_url)?;
        let stored = self.store.put(&bytes, extension)?;
        log::info!("bill image {} stored ({} bytes)", stored.name, bytes.len());
        Ok(stored)
    }

    pub fn image(&self, name: &str) -> Result<Option<Vec<u8>>, DomainError> {
        self.store.get(name)
    }

    /// Checks the phone before uploading so a customer without a usable
    /// number does not leave an orphan image behind.
    pub fn share_bill(
        &self,
        customer_id: Uuid,
        date: NaiveDate,
        data_url: &str,
    ) -> Result<SharedBill, DomainError> {
        let customer = self
            .customers
            .find_by_id(customer_id)?
            .ok_or(DomainError::NotFound("Customer"))?;
        if customer.phone_digits().is_empty() {
            return Err(DomainError::invalid("no valid phone number found"));
        }

        let stored = self.upload_image(data_url)?;
        let message = bill_message(date, &stored.url);
        let link = share_link(&customer.phone, &message)
            .ok_or_else(|| DomainError::invalid("no valid phone number found"))?;
        Ok(SharedBill {
            url: stored.url,
            share_link: link,
        })
    }
}
