//! # scanward-verifier
//!
//! 도메인 소유권 검증 상태 머신.
//!
//! # Module Structure
//!
//! - [`error`]: 검증 에러 (`VerifierError`)
//! - [`config`]: 검증 설정 (`VerifierConfig`)
//! - [`transport`]: DNS/HTTPS challenge 추상화 (`ChallengeTransport`, `NetworkTransport`)
//! - [`verifier`]: 상태 머신 (`DomainVerifier`, `VerificationGate`)
//!
//! # Architecture
//!
//! ```text
//! request_or_verify ──> DomainVerifier ──> ChallengeTransport (dns / file)
//!                             │
//!                             └──> VerificationStore (도메인당 레코드 1개)
//!
//! ScanQueue ──VerificationGate::ensure_verified──> DomainVerifier
//! ```

pub mod config;
pub mod error;
pub mod transport;
pub mod verifier;

pub use config::VerifierConfig;
pub use error::VerifierError;
pub use transport::{ChallengeResponse, ChallengeTransport, NetworkTransport};
pub use verifier::{DomainVerifier, VerificationGate};
