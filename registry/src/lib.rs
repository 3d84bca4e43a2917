use std::sync::Arc;

use adapter::redis::RedisClient;
use adapter::repository::{
    auth::AuthRepositoryImpl, health::HealthCheckRepositoryImpl, lot::LotRepositoryImpl,
    reservation::ReservationRepositoryImpl, spot::SpotRepositoryImpl, user::UserRepositoryImpl,
};
use adapter::database::ConnectionPool;
use kernel::repository::{
    auth::AuthRepository, health::HealthCheckRepository, lot::LotRepository,
    reservation::ReservationRepository, spot::SpotRepository, user::UserRepository,
};
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    auth_repository: Arc<dyn AuthRepository>,
    user_repository: Arc<dyn UserRepository>,
    lot_repository: Arc<dyn LotRepository>,
    spot_repository: Arc<dyn SpotRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
}

impl AppRegistry {
    pub fn new(
        pool: ConnectionPool,
        redis_client: Arc<RedisClient>,
        app_config: &AppConfig,
    ) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let auth_repository = Arc::new(AuthRepositoryImpl::new(
            pool.clone(),
            redis_client.clone(),
            app_config.auth.ttl,
        ));
        let user_repository = Arc::new(UserRepositoryImpl::new(pool.clone()));
        let lot_repository = Arc::new(LotRepositoryImpl::new(pool.clone()));
        let spot_repository = Arc::new(SpotRepositoryImpl::new(pool.clone()));
        let reservation_repository = Arc::new(ReservationRepositoryImpl::new(pool.clone()));
        Self {
            health_check_repository,
            auth_repository,
            user_repository,
            lot_repository,
            spot_repository,
            reservation_repository,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn auth_repository(&self) -> Arc<dyn AuthRepository> {
        self.auth_repository.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn lot_repository(&self) -> Arc<dyn LotRepository> {
        self.lot_repository.clone()
    }

    pub fn spot_repository(&self) -> Arc<dyn SpotRepository> {
        self.spot_repository.clone()
    }

    pub fn reservation_repository(&self) -> Arc<dyn ReservationRepository> {
        self.reservation_repository.clone()
    }
}
