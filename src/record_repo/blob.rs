// Multiaddr list encoding. [version: u8][wincode Vec<String>].
// Rows without a known version byte are the older comma-joined UTF-8 form.

use crate::error::{Error, Result};

pub(super) const BLOB_VERSION_MULTIADDRS: u8 = 1;

pub(super) fn encode_multiaddrs(addrs: &[String]) -> Result<Vec<u8>> {
    let payload = wincode::serialize(&addrs.to_vec())
        .map_err(|e| Error::Blob(format!("wincode multiaddrs: {}", e)))?;
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(BLOB_VERSION_MULTIADDRS);
    out.extend_from_slice(&payload);
    Ok(out)
}

pub(super) fn decode_multiaddrs(bytes: &[u8]) -> Result<Vec<String>> {
    match bytes.first() {
        None => Ok(Vec::new()),
        Some(&BLOB_VERSION_MULTIADDRS) => wincode::deserialize::<Vec<String>>(&bytes[1..])
            .map_err(|e| Error::Blob(format!("wincode multiaddrs: {}", e))),
        Some(_) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::Blob(format!("legacy multiaddrs: {}", e)))?;
            tracing::debug!("decoding legacy comma-joined multiaddrs");
            Ok(text
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }
    }
}
