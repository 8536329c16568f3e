//! TLS client configuration for the built-in drivers.
//!
//! Follows libpq's `sslmode=require`: the connection is always encrypted, but
//! the server certificate chain is only verified when a root CA file is
//! configured. Handshake signatures are checked in both cases.

use crate::error::TlsError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Build a rustls client configuration.
///
/// Without `ca_cert` any server certificate is accepted; with it, the chain
/// must lead to one of the certificates in that PEM file.
pub fn client_config(ca_cert: Option<&Path>) -> Result<ClientConfig, TlsError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let config = if let Some(path) = ca_cert {
        let mut roots = RootCertStore::empty();
        load_custom_ca(&mut roots, path)?;
        builder
            .with_root_certificates(roots)
            .with_no_client_auth()
    } else {
        debug!("No CA configured, server certificate chain will not be verified");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(EncryptOnlyVerifier { provider }))
            .with_no_client_auth()
    };

    Ok(config)
}

fn load_custom_ca(roots: &mut RootCertStore, path: &Path) -> Result<(), TlsError> {
    let shown = path.display().to_string();
    let file = fs::File::open(path).map_err(|source| TlsError::CaCertRead {
        path: shown.clone(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let mut found = 0usize;
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|source| TlsError::CaCertRead {
            path: shown.clone(),
            source,
        })?;
        roots.add(cert)?;
        found += 1;
    }

    if found == 0 {
        return Err(TlsError::NoCertificates(shown));
    }

    debug!("Trusting {} certificate(s) from {}", found, shown);
    Ok(())
}

/// Accepts any certificate chain but still verifies handshake signatures
#[derive(Debug)]
struct EncryptOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for EncryptOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
