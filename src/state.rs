//! Shared application state
//!
//! One `AppState` exists per process. It carries the immutable configuration
//! and provider registry every session reads from, the transcript interceptor,
//! and WebSocket connection accounting.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::config::ServerConfig;
use crate::core::{
    EchoInterceptor, ProviderRegistry, RegistryError, SttGateway, TranscriptInterceptor,
    TtsGateway,
};

/// Why a WebSocket connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionLimitError {
    #[error("global WebSocket connection limit reached")]
    GlobalLimitReached,
    #[error("per-IP WebSocket connection limit reached")]
    PerIpLimitReached,
}

pub struct AppState {
    pub config: ServerConfig,
    pub registry: ProviderRegistry,
    pub interceptor: Arc<dyn TranscriptInterceptor>,
    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, u32>,
}

impl AppState {
    /// Build the state with the default echo interceptor.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, RegistryError> {
        Self::with_interceptor(config, Arc::new(EchoInterceptor))
    }

    pub fn with_interceptor(
        config: ServerConfig,
        interceptor: Arc<dyn TranscriptInterceptor>,
    ) -> Result<Arc<Self>, RegistryError> {
        let registry = ProviderRegistry::from_config(&config)?;
        Ok(Arc::new(Self {
            config,
            registry,
            interceptor,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        }))
    }

    /// Resolve both gateways for a new session.
    pub fn session_gateways(&self) -> (SttGateway, TtsGateway) {
        (
            SttGateway::resolve(&self.registry),
            TtsGateway::resolve(&self.registry),
        )
    }

    /// Reserve a WebSocket slot for `ip`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        if let Some(max) = self.config.max_websocket_connections {
            self.ws_connections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                    (current < max).then_some(current + 1)
                })
                .map_err(|_| ConnectionLimitError::GlobalLimitReached)?;
        } else {
            self.ws_connections.fetch_add(1, Ordering::SeqCst);
        }

        let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip {
            drop(per_ip);
            self.ws_connections.fetch_sub(1, Ordering::SeqCst);
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *per_ip += 1;
        Ok(())
    }

    /// Give back a slot taken by [`try_acquire_connection`](Self::try_acquire_connection).
    pub fn release_connection(&self, ip: IpAddr) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(1)
            });

        let emptied = match self.ip_connections.get_mut(&ip) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if emptied {
            self.ip_connections.remove_if(&ip, |_, count| *count == 0);
        }
        debug!(ip = %ip, active = self.ws_connection_count(), "Connection released");
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.ip_connections.get(ip).map(|count| *count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use std::net::Ipv4Addr;

    #[test]
    fn test_connection_tracking_basic() {
        let mut config = test_config();
        config.max_websocket_connections = Some(10);
        config.max_connections_per_ip = 3;
        let state = AppState::new(config).unwrap();
        let ip: IpAddr = Ipv4Addr::new(192, 168, 1, 100).into();

        assert_eq!(state.ws_connection_count(), 0);
        assert_eq!(state.ip_connection_count(&ip), 0);

        for expected in 1..=3 {
            assert!(state.try_acquire_connection(ip).is_ok());
            assert_eq!(state.ws_connection_count(), expected);
            assert_eq!(state.ip_connection_count(&ip), expected as u32);
        }

        assert_eq!(
            state.try_acquire_connection(ip),
            Err(ConnectionLimitError::PerIpLimitReached)
        );
        assert_eq!(state.ws_connection_count(), 3);

        state.release_connection(ip);
        assert_eq!(state.ws_connection_count(), 2);
        assert_eq!(state.ip_connection_count(&ip), 2);
        assert!(state.try_acquire_connection(ip).is_ok());
    }

    #[test]
    fn test_global_connection_limit() {
        let mut config = test_config();
        config.max_websocket_connections = Some(5);
        config.max_connections_per_ip = 10;
        let state = AppState::new(config).unwrap();

        let ips: Vec<IpAddr> = (1..=6)
            .map(|i| Ipv4Addr::new(192, 168, 1, i).into())
            .collect();

        for ip in &ips[0..5] {
            assert!(state.try_acquire_connection(*ip).is_ok());
        }
        assert_eq!(state.ws_connection_count(), 5);
        assert_eq!(
            state.try_acquire_connection(ips[5]),
            Err(ConnectionLimitError::GlobalLimitReached)
        );

        state.release_connection(ips[0]);
        assert_eq!(state.ip_connection_count(&ips[0]), 0);
        assert!(state.try_acquire_connection(ips[5]).is_ok());
    }

    #[test]
    fn test_release_without_acquire_is_harmless() {
        let state = AppState::new(test_config()).unwrap();
        let ip: IpAddr = Ipv4Addr::LOCALHOST.into();
        state.release_connection(ip);
        assert_eq!(state.ws_connection_count(), 0);
        assert_eq!(state.ip_connection_count(&ip), 0);
    }

    #[test]
    fn test_session_gateways_follow_registry() {
        let state = AppState::new(test_config()).unwrap();
        let (stt, tts) = state.session_gateways();
        assert_eq!(stt.provider_name(), "mock");
        assert_eq!(tts.provider_name(), "mock");
    }
}
