//! Petition Service - requests for movies the catalog lacks

use crate::domain::entities::{Petition, PetitionId, Stance, UserId};
use crate::domain::error::{StoreError, StoreResult};
use crate::domain::ports::PetitionRepository;
use std::sync::Arc;

pub struct PetitionService {
    petitions: Arc<dyn PetitionRepository>,
}

impl PetitionService {
    pub fn new(petitions: Arc<dyn PetitionRepository>) -> Self {
        Self { petitions }
    }

    pub async fn list(&self) -> StoreResult<Vec<Petition>> {
        self.petitions.list_petitions().await
    }

    pub async fn create(&self, movie_name: &str, user_id: UserId) -> StoreResult<Petition> {
        let movie_name = movie_name.trim();
        if movie_name.is_empty() {
            return Err(StoreError::Invalid("movie name is required".to_string()));
        }
        let petition = self.petitions.insert_petition(movie_name, user_id).await?;
        tracing::info!("petition {} for '{}' opened by user {}", petition.id, movie_name, user_id);
        Ok(petition)
    }

    /// Toggle the user's stance.
    ///
    /// Casting a stance replaces the opposite one; casting the same stance
    /// again withdraws it. Returns the updated petition.
    pub async fn toggle(
        &self,
        id: PetitionId,
        user_id: UserId,
        stance: Stance,
    ) -> StoreResult<Petition> {
        if self.petitions.get_petition(id).await?.is_none() {
            return Err(StoreError::NotFound("petition"));
        }

        let next = match self.petitions.stance(id, user_id).await? {
            Some(current) if current == stance => None,
            _ => Some(stance),
        };
        self.petitions.set_stance(id, user_id, next).await?;

        self.petitions
            .get_petition(id)
            .await?
            .ok_or(StoreError::NotFound("petition"))
    }
}
