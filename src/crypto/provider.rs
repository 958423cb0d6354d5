use std::collections::BTreeMap;
use std::sync::OnceLock;

static PROVIDER: OnceLock<Provider> = OnceLock::new();

/// Process-wide cryptographic provider.
///
/// Registered exactly once, on first use; concurrent first-use from
/// multiple threads observes a single registration.
#[derive(Debug)]
pub struct Provider {
    symmetric_names: BTreeMap<u8, &'static str>,
}

impl Provider {
    pub fn global() -> &'static Provider {
        PROVIDER.get_or_init(Provider::register)
    }

    fn register() -> Provider {
        let symmetric_names = BTreeMap::from([
            (0u8, "None"),
            (1, "IDEA"),
            (2, "3DES"),
            (3, "CAST5"),
            (4, "BLOWFISH"),
            (5, "SAFER"),
            (6, "DES"),
            (7, "AES128"),
            (8, "AES192"),
            (9, "AES256"),
            (10, "TWOFISH"),
            (11, "CAMELLIA128"),
            (12, "CAMELLIA192"),
            (13, "CAMELLIA256"),
        ]);

        Provider { symmetric_names }
    }

    /// Display name for a symmetric algorithm code.
    pub fn symmetric_name(&self, code: u8) -> &'static str {
        self.symmetric_names
            .get(&code)
            .copied()
            .unwrap_or("Unknown algorithm code.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let a = Provider::global() as *const Provider;
        let b = Provider::global() as *const Provider;
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_first_use_yields_one_instance() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Provider::global() as *const Provider as usize))
            .collect();
        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            seen.insert(handle.join().unwrap());
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn catalog_names() {
        let provider = Provider::global();
        assert_eq!(provider.symmetric_name(0), "None");
        assert_eq!(provider.symmetric_name(2), "3DES");
        assert_eq!(provider.symmetric_name(7), "AES128");
        assert_eq!(provider.symmetric_name(9), "AES256");
        assert_eq!(provider.symmetric_name(13), "CAMELLIA256");
        assert_eq!(provider.symmetric_name(99), "Unknown algorithm code.");
    }
}
