//! Ephemeral self-signed certificate chain for mutual-TLS integration tests.
//!
//! Generates a throwaway CA plus a server leaf (`localhost`) and a client
//! leaf, all signed by that CA. The client side feeds these into
//! `apns_transport::ClientIdentity`/`TrustAnchors`; the server side builds a
//! `rustls::ServerConfig` that requires and verifies the client leaf.

use std::sync::Arc;

use apns_transport::{ClientIdentity, TrustAnchors};
use rcgen::{CertificateParams, DistinguishedName, DnType, Issuer, KeyPair};
use rustls::ServerConfig;
use rustls::server::WebPkiClientVerifier;

/// A self-signed CA and the server/client leaf certificates it issued.
pub struct TestCertificates {
    ca_cert_pem: String,
    server_cert_pem: String,
    server_key_pem: String,
    client_cert_pem: String,
    client_key_pem: String,
}

impl TestCertificates {
    /// Generate a fresh CA and a pair of leaf certificates signed by it.
    ///
    /// # Panics
    ///
    /// Panics if certificate generation fails; this only happens if `rcgen`
    /// itself is broken, which would make every test in this crate useless
    /// anyway, so callers are not expected to handle it.
    #[must_use]
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().expect("generate CA key");
        let mut ca_params = CertificateParams::new(Vec::new()).expect("empty CA params");
        ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let mut ca_name = DistinguishedName::new();
        ca_name.push(DnType::CommonName, "apns-harness test CA");
        ca_params.distinguished_name = ca_name;
        let ca_cert = ca_params.clone().self_signed(&ca_key).expect("self-sign CA");
        let issuer = Issuer::new(ca_params, &ca_key);

        let server_key = KeyPair::generate().expect("generate server key");
        let server_params =
            CertificateParams::new(vec!["localhost".to_string()]).expect("server SAN params");
        let server_cert =
            server_params.signed_by(&server_key, &issuer).expect("sign server cert");

        let client_key = KeyPair::generate().expect("generate client key");
        let mut client_params = CertificateParams::new(Vec::new()).expect("client params");
        let mut client_name = DistinguishedName::new();
        client_name.push(DnType::CommonName, "apns-harness test client");
        client_params.distinguished_name = client_name;
        let client_cert =
            client_params.signed_by(&client_key, &issuer).expect("sign client cert");

        Self {
            ca_cert_pem: ca_cert.pem(),
            server_cert_pem: server_cert.pem(),
            server_key_pem: server_key.serialize_pem(),
            client_cert_pem: client_cert.pem(),
            client_key_pem: client_key.serialize_pem(),
        }
    }

    /// Client identity (certificate + key) presented to the fake server.
    #[must_use]
    pub fn client_identity(&self) -> ClientIdentity {
        ClientIdentity::from_pem(self.client_cert_pem.as_bytes(), self.client_key_pem.as_bytes())
            .expect("client identity parses")
    }

    /// Trust anchors a client should use to verify the fake server's leaf.
    #[must_use]
    pub fn client_trust_anchors(&self) -> TrustAnchors {
        TrustAnchors::from_pem(self.ca_cert_pem.as_bytes()).expect("trust anchors parse")
    }

    /// `rustls::ServerConfig` for a fake server: presents the server leaf,
    /// and requires (and verifies) a client certificate signed by the same
    /// CA, matching the real gateway's mutual-TLS contract (spec §6).
    #[must_use]
    pub fn server_config(&self) -> Arc<ServerConfig> {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut roots = rustls::RootCertStore::empty();
        for cert in rustls_pemfile::certs(&mut self.ca_cert_pem.as_bytes()) {
            roots.add(cert.expect("valid CA pem")).expect("add CA root");
        }
        let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
            .build()
            .expect("build client verifier");

        let cert_chain: Vec<_> = rustls_pemfile::certs(&mut self.server_cert_pem.as_bytes())
            .collect::<Result<_, _>>()
            .expect("valid server cert pem");
        let key = rustls_pemfile::private_key(&mut self.server_key_pem.as_bytes())
            .expect("valid server key pem")
            .expect("server key present");

        let config = ServerConfig::builder()
            .with_client_cert_verifier(verifier)
            .with_single_cert(cert_chain, key)
            .expect("build server config");
        Arc::new(config)
    }
}
