// Serving certificate expiry lookup

use crate::Result;
use crate::error::MonitorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use x509_parser::pem::parse_x509_pem;

/// Expiry data of the serving certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateExpiry {
    pub subject: String,
    pub not_after: DateTime<Utc>,
}

impl CertificateExpiry {
    /// Whole days left before `not_after`; zero or negative once expired
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_days()
    }
}

/// Source of the serving certificate's expiry date
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn expiry(&self) -> Result<CertificateExpiry>;

    fn source_name(&self) -> &str {
        "Serving certificate"
    }
}

/// Certificate read from a PEM file on disk
pub struct PemFileCertificate {
    path: PathBuf,
}

impl PemFileCertificate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CertificateSource for PemFileCertificate {
    async fn expiry(&self) -> Result<CertificateExpiry> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            MonitorError::unavailable(self.source_name(), format!("{}: {}", self.path.display(), e))
        })?;

        parse_pem_expiry(&bytes)
    }
}

/// Extract subject and notAfter from the first certificate of a PEM bundle
pub fn parse_pem_expiry(bytes: &[u8]) -> Result<CertificateExpiry> {
    let (_, pem) = parse_x509_pem(bytes).map_err(|e| MonitorError::Parse {
        message: format!("Invalid PEM: {}", e),
    })?;

    let cert = pem.parse_x509().map_err(|e| MonitorError::Parse {
        message: format!("Invalid X.509 certificate: {}", e),
    })?;

    let timestamp = cert.validity().not_after.timestamp();
    let not_after = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
        MonitorError::Parse {
            message: format!("notAfter out of range: {}", timestamp),
        }
    })?;

    Ok(CertificateExpiry {
        subject: cert.subject().to_string(),
        not_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_days_until_expiry() {
        let now = Utc::now();
        let expiry = CertificateExpiry {
            subject: "CN=vault.example.com".to_string(),
            not_after: now + Duration::days(15) + Duration::hours(2),
        };
        assert_eq!(expiry.days_until_expiry(now), 15);

        let expired = CertificateExpiry {
            subject: "CN=vault.example.com".to_string(),
            not_after: now - Duration::hours(3),
        };
        assert_eq!(expired.days_until_expiry(now), 0);
        assert!(expired.not_after < now);
    }

    #[test]
    fn test_parse_rejects_non_pem() {
        let err = parse_pem_expiry(b"this is not a certificate").unwrap_err();
        assert!(matches!(err, MonitorError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let source = PemFileCertificate::new("/nonexistent/vault.crt");
        let err = source.expiry().await.unwrap_err();
        assert!(matches!(err, MonitorError::SourceUnavailable { .. }));
    }
}
