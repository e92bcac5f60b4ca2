use std::sync::Arc;

use market_types::domain::livestock::{
    Image, Livestock, LivestockFilter, LivestockPatch, LivestockStatus, NewLivestock,
};
use market_types::ports::LivestockRepository;
use uuid::Uuid;

use super::Upload;
use crate::errors::AppError;

pub struct CatalogService<R: LivestockRepository> {
    repo: Arc<R>,
}

impl<R: LivestockRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &LivestockFilter) -> Result<Vec<Livestock>, AppError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(AppError::BadRequest("min_price exceeds max_price".into()));
            }
        }
        Ok(self.repo.list_livestock(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Livestock, AppError> {
        self.repo
            .get_livestock(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("livestock {id}")))
    }

    pub async fn image(&self, id: Uuid) -> Result<Image, AppError> {
        self.repo
            .get_image(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("image {id}")))
    }

    pub async fn create(
        &self,
        input: NewLivestock,
        uploads: Vec<Upload>,
    ) -> Result<Livestock, AppError> {
        let mut item = Livestock::new(input).map_err(AppError::bad_request)?;
        let images = uploads
            .into_iter()
            .map(Upload::into_image)
            .collect::<Result<Vec<_>, _>>()?;
        for image in images {
            item.image_ids.push(self.repo.put_image(image).await?);
        }
        let item = self.repo.create_livestock(item).await?;
        tracing::info!(livestock_id = %item.id, images = item.image_ids.len(), "livestock listed");
        Ok(item)
    }

    pub async fn update(&self, id: Uuid, patch: LivestockPatch) -> Result<Livestock, AppError> {
        let mut item = self.get(id).await?;
        item.apply(patch).map_err(AppError::bad_request)?;
        self.save(item).await
    }

    pub async fn add_images(&self, id: Uuid, uploads: Vec<Upload>) -> Result<Livestock, AppError> {
        if uploads.is_empty() {
            return Err(AppError::BadRequest("no images uploaded".into()));
        }
        let mut item = self.get(id).await?;
        let images = uploads
            .into_iter()
            .map(Upload::into_image)
            .collect::<Result<Vec<_>, _>>()?;
        for image in images {
            item.image_ids.push(self.repo.put_image(image).await?);
        }
        item.updated_at = chrono::Utc::now();
        self.save(item).await
    }

    pub async fn remove_image(&self, id: Uuid, image_id: Uuid) -> Result<Livestock, AppError> {
        let mut item = self.get(id).await?;
        let before = item.image_ids.len();
        item.image_ids.retain(|i| *i != image_id);
        if item.image_ids.len() == before {
            return Err(AppError::NotFound(format!("image {image_id} on livestock {id}")));
        }
        item.updated_at = chrono::Utc::now();
        let item = self.save(item).await?;
        self.repo.delete_image(image_id).await?;
        Ok(item)
    }

    /// Sold listings belong to a live order and cannot be removed.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let item = self.get(id).await?;
        if item.status == LivestockStatus::Sold {
            return Err(AppError::Conflict(format!(
                "livestock {id} is sold and cannot be deleted"
            )));
        }
        if !self.repo.delete_livestock(id).await? {
            return Err(AppError::NotFound(format!("livestock {id}")));
        }
        for image_id in item.image_ids {
            self.repo.delete_image(image_id).await?;
        }
        tracing::info!(livestock_id = %id, "livestock deleted");
        Ok(())
    }

    async fn save(&self, item: Livestock) -> Result<Livestock, AppError> {
        let id = item.id;
        self.repo
            .save_livestock(item)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("livestock {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_repo::memory::InMemoryRepo;
    use market_types::domain::livestock::{Category, Gender};

    fn input() -> NewLivestock {
        NewLivestock {
            name: "Nanny".into(),
            category: Category::Goat,
            breed: "Saanen".into(),
            age_months: 20,
            weight_kg: 45.0,
            gender: Gender::Female,
            description: "Milking doe".into(),
            price_cents: 60_000,
        }
    }

    fn png(bytes: &[u8]) -> Upload {
        Upload {
            content_type: "image/png".into(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn create_with_images_and_fetch_blob() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let item = svc.create(input(), vec![png(b"one"), png(b"two")]).await.unwrap();
        assert_eq!(item.image_ids.len(), 2);

        let image = svc.image(item.image_ids[1]).await.unwrap();
        assert_eq!(image.data, b"two");
        assert_eq!(image.content_type, "image/png");

        let listed = svc.list(&LivestockFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let res = svc
            .create(
                input(),
                vec![Upload {
                    content_type: "application/pdf".into(),
                    bytes: vec![1],
                }],
            )
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert!(svc.list(&LivestockFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_removal_and_delete() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let item = svc.create(input(), vec![png(b"a")]).await.unwrap();
        let image_id = item.image_ids[0];

        let item = svc.remove_image(item.id, image_id).await.unwrap();
        assert!(item.image_ids.is_empty());
        assert!(matches!(svc.image(image_id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.remove_image(item.id, image_id).await,
            Err(AppError::NotFound(_))
        ));

        svc.delete(item.id).await.unwrap();
        assert!(matches!(svc.get(item.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn sold_listing_cannot_be_deleted() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let item = svc.create(input(), vec![]).await.unwrap();
        svc.update(
            item.id,
            LivestockPatch {
                status: Some(LivestockStatus::Sold),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(matches!(svc.delete(item.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn inverted_price_range_is_bad_request() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let res = svc
            .list(&LivestockFilter {
                min_price: Some(10),
                max_price: Some(5),
                ..Default::default()
            })
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
    }
}
