//! Deterministic variation seeds.
//!
//! Every reproducible choice in the pipeline derives from one 32-bit FNV-1a
//! hash of the row identity. Call sites re-hash the seed with a fixed salt
//! so independent choices do not correlate. Hashing runs over UTF-16 code
//! units so the values match other implementations of the same pipeline.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Delimiter between identity fields and between seed and salt.
pub const SEED_DELIMITER: &str = "|";

/// 32-bit FNV-1a over the UTF-16 code units of `text`.
pub fn fnv1a(text: &str) -> u32 {
    text.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Seed for a row identity. Fields are trimmed and lower-cased first, so
/// the result ignores case and surrounding whitespace.
pub fn variation_seed(role: &str, task_type: &str, company: &str, row_id: i64) -> u32 {
    let key = [
        role.trim().to_lowercase(),
        task_type.trim().to_lowercase(),
        company.trim().to_lowercase(),
        row_id.to_string(),
    ]
    .join(SEED_DELIMITER);
    fnv1a(&key)
}

/// Re-hash `seed` with `salt`.
pub fn salted(seed: u32, salt: &str) -> u32 {
    fnv1a(&format!("{seed}{SEED_DELIMITER}{salt}"))
}

/// Index into a candidate list of length `len`, or `None` when it is empty.
pub fn pick_index(seed: u32, salt: &str, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(salted(seed, salt) as usize % len)
}

/// Pick an element of `candidates`.
pub fn pick<'a, T>(seed: u32, salt: &str, candidates: &'a [T]) -> Option<&'a T> {
    pick_index(seed, salt, candidates.len()).map(|i| &candidates[i])
}

/// Call-site salts. Changing any of these changes every generated text.
pub mod salts {
    pub fn metrics(bucket_key: &str) -> String {
        format!("metrics|{bucket_key}")
    }

    pub fn template(mode: &str, role: &str, task_type: &str) -> String {
        format!("template|{mode}|{role}|{task_type}")
    }

    pub fn verb(slot: &str, role: &str) -> String {
        format!("verb|{slot}|{role}")
    }

    pub fn baseline(class: &str) -> String {
        format!("baseline|{class}")
    }

    pub fn tail(bucket: &str) -> String {
        format!("tail|{bucket}")
    }

    pub fn micro(slot: &str) -> String {
        format!("micro|{slot}")
    }
}
