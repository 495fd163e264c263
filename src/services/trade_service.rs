use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::metrics::{names, MetricsRecorder};
use crate::models::{PageRequest, PageResponse, Trade, TradeInput};
use crate::repository::TradeRepository;

pub struct TradeService {
    repo: Arc<dyn TradeRepository>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl TradeService {
    pub fn new(repo: Arc<dyn TradeRepository>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { repo, metrics }
    }

    pub fn get_by_id(&self, id: u64) -> Result<Trade> {
        self.repo.find_by_id(id)?.ok_or_else(|| not_found(id))
    }

    pub fn list_all(&self) -> Result<Vec<Trade>> {
        self.repo.find_all()
    }

    /// Page query then count query; the two are not read atomically.
    pub fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse<Trade>> {
        let content = self
            .repo
            .fetch_page(request.offset(), request.limit(), &request.sort())?;
        let total = self.repo.count()?;
        debug!(page = request.page(), size = request.size(), total, "Fetched trades page");
        Ok(PageResponse::of(content, request, total))
    }

    pub fn count(&self) -> Result<u64> {
        self.repo.count()
    }

    pub fn create(&self, input: TradeInput) -> Result<Trade> {
        input.validate()?;
        let trade = self.repo.insert(input)?;
        self.metrics.increment_counter(names::TRADES_CREATED);
        info!(id = trade.id, symbol = %trade.symbol, "Trade created");
        Ok(trade)
    }

    pub fn update(&self, id: u64, input: TradeInput) -> Result<Trade> {
        input.validate()?;
        let trade = self.repo.update(id, input)?.ok_or_else(|| not_found(id))?;
        self.metrics.increment_counter(names::TRADES_UPDATED);
        info!(id, "Trade updated");
        Ok(trade)
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        if !self.repo.delete(id)? {
            return Err(not_found(id));
        }
        self.metrics.increment_counter(names::TRADES_DELETED);
        info!(id, "Trade deleted");
        Ok(())
    }
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("Trade with id {} not found", id))
}
