use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::metrics::{names, MetricsRecorder};
use crate::models::{PageRequest, PageResponse, User, UserInput};
use crate::repository::UserRepository;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { repo, metrics }
    }

    pub fn get_by_id(&self, id: u64) -> Result<User> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| not_found(id))
    }

    pub fn list_all(&self) -> Result<Vec<User>> {
        self.repo.find_all()
    }

    /// Assembles one page: a page query followed by a count query.
    pub fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse<User>> {
        let content = self
            .repo
            .fetch_page(request.offset(), request.limit(), &request.sort())?;
        let total = self.repo.count()?;
        debug!(page = request.page(), size = request.size(), total, "Fetched users page");
        Ok(PageResponse::of(content, request, total))
    }

    pub fn count(&self) -> Result<u64> {
        self.repo.count()
    }

    pub fn create(&self, input: UserInput) -> Result<User> {
        input.validate()?;
        let user = self.repo.insert(input)?;
        self.metrics.increment_counter(names::USERS_CREATED);
        info!(id = user.id, "User created");
        Ok(user)
    }

    pub fn update(&self, id: u64, input: UserInput) -> Result<User> {
        input.validate()?;
        let user = self.repo.update(id, input)?.ok_or_else(|| not_found(id))?;
        self.metrics.increment_counter(names::USERS_UPDATED);
        info!(id, "User updated");
        Ok(user)
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        if !self.repo.delete(id)? {
            return Err(not_found(id));
        }
        self.metrics.increment_counter(names::USERS_DELETED);
        info!(id, "User deleted");
        Ok(())
    }
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("User with id {} not found", id))
}
