use actix_files::NamedFile;
use actix_web::web::{Data, Path, Query};
use chrono::Utc;
use serde::Deserialize;

use crate::core::ports::storage::DocumentStore;
use crate::error::Error;
use crate::storer::sign::UrlSigner;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub exp: i64,
    pub sig: String,
}

/// Serves a private document when presented with a valid, unexpired signed
/// URL. No session is required; the signature is the capability.
pub async fn fetch<D: DocumentStore>(params: Path<(String, String)>, Query(q): Query<SignedQuery>, signer: Data<UrlSigner>, documents: Data<D>) -> Result<NamedFile, Error> {
    let (folder, file) = params.into_inner();
    let path = format!("{}/{}", folder, file);
    if !signer.verify(&path, q.exp, &q.sig, Utc::now()) {
        return Err(Error::Unauthorized("invalid or expired document link".into()));
    }
    Ok(NamedFile::open(documents.resolve(&path)?)?)
}
