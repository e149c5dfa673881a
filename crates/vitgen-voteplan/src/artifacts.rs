use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use vitgen_core::error::VitgenError;

use crate::assemble::VotePlan;

/// Name of the election key file written next to private plans.
pub const ENCRYPTION_KEY_FILE: &str = "vote_encryption_key.pk";

/// Persist every plan's descriptor and certificates under `dir`.
///
/// Files are named `{payload}_voteplan_{plan_id}.{json,cert-unsigned,cert-signed}`;
/// the signed certificate only exists when the plan was signed.
pub fn write_artifacts(dir: &Path, plans: &[VotePlan]) -> Result<Vec<PathBuf>, VitgenError> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for plan in plans {
        let stem = format!("{}_voteplan_{}", plan.payload, plan.plan_id);

        let descriptor = dir.join(format!("{stem}.json"));
        fs::write(&descriptor, &plan.descriptor)?;
        written.push(descriptor);

        let unsigned = dir.join(format!("{stem}.cert-unsigned"));
        fs::write(&unsigned, &plan.unsigned_cert)?;
        written.push(unsigned);

        if let Some(signed_cert) = &plan.signed_cert {
            let signed = dir.join(format!("{stem}.cert-signed"));
            fs::write(&signed, signed_cert)?;
            written.push(signed);
        }
    }

    if let Some(key) = plans.iter().find_map(|p| p.encryption_key.as_ref()) {
        let path = dir.join(ENCRYPTION_KEY_FILE);
        fs::write(&path, key)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "vote plan artifacts written");
    Ok(written)
}
