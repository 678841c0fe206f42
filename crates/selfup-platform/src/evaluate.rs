use selfup_fetch::ProgressSink;
use selfup_version::Version;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::products::{InstalledProducts, ProductRecord};

/// Find the installed version of the product with upgrade code `product_id`.
///
/// Records are scanned in the order the source lists them and the first
/// match wins. `Ok(None)` means the product is not installed. This is
/// blocking work; run it off the async executor.
pub fn evaluate_installed(
    products: &dyn InstalledProducts,
    product_id: &str,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<Option<Version>> {
    let keys = products.keys()?;
    let total = keys.len();
    debug!(records = total, product_id, "scanning installed products");

    for (i, key) in keys.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        progress.set_progress(i as f32 / total as f32);

        let Some(record) = products.read(key) else {
            debug!(key = %key, "record could not be opened, skipping");
            continue;
        };
        if !record
            .upgrade_code
            .as_ref()
            .is_some_and(|code| code.matches(product_id))
        {
            continue;
        }
        match installed_version(&record) {
            Some(version) => {
                progress.set_progress(1.0);
                debug!(key = %key, version = %version, "installed product found");
                return Ok(Some(version));
            }
            None => warn!(key = %key, "matching record has no valid version, skipping"),
        }
    }

    progress.set_progress(1.0);
    Ok(None)
}

fn installed_version(record: &ProductRecord) -> Option<Version> {
    let primary = Version::parse(record.primary_version.as_deref()?).ok()?;
    let secondary = record
        .secondary_version
        .as_deref()
        .and_then(|v| Version::parse(v).ok());
    Some(secondary.unwrap_or(primary))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use selfup_fetch::NoProgress;

    use super::*;
    use crate::products::{ProductIdentifier, StaticProducts};

    const PRODUCT: &str = "{EF5D5806-B90B-4AA3-800A-2D7EA1592BA0}";

    fn record(code: ProductIdentifier, primary: Option<&str>, secondary: Option<&str>) -> ProductRecord {
        ProductRecord {
            upgrade_code:      Some(code),
            primary_version:   primary.map(str::to_string),
            secondary_version: secondary.map(str::to_string),
        }
    }

    fn evaluate(products: &StaticProducts) -> Result<Option<Version>> {
        evaluate_installed(products, PRODUCT, &CancellationToken::new(), &NoProgress)
    }

    #[test]
    fn test_secondary_version_preferred() {
        let products = StaticProducts::new().with(
            "bundle",
            record(ProductIdentifier::Single(PRODUCT.to_lowercase()), Some("1.9"), Some("1.9.5")),
        );
        assert_eq!(evaluate(&products).unwrap(), Some(Version::new(1, 9, 5, 0)));
    }

    #[test]
    fn test_primary_used_when_secondary_invalid() {
        let products = StaticProducts::new().with(
            "bundle",
            record(ProductIdentifier::Multi(vec!["{X}".into(), PRODUCT.into()]), Some("1.9"), Some("beta")),
        );
        assert_eq!(evaluate(&products).unwrap(), Some(Version::new(1, 9, 0, 0)));
    }

    #[test]
    fn test_invalid_primary_skips_record() {
        let products = StaticProducts::new()
            .with(
                "a",
                record(ProductIdentifier::Single(PRODUCT.into()), Some("garbage"), Some("3.0")),
            )
            .with(
                "b",
                record(ProductIdentifier::Single(PRODUCT.into()), Some("2.1"), None),
            );
        assert_eq!(evaluate(&products).unwrap(), Some(Version::new(2, 1, 0, 0)));
    }

    #[test]
    fn test_not_installed() {
        let products = StaticProducts::new()
            .with("other", record(ProductIdentifier::Single("{OTHER}".into()), Some("1.0"), None))
            .with("no-code", ProductRecord::default());
        assert_eq!(evaluate(&products).unwrap(), None);
        assert_eq!(evaluate(&StaticProducts::new()).unwrap(), None);
    }

    #[test]
    fn test_cancelled_before_scan() {
        let products = StaticProducts::new()
            .with("a", record(ProductIdentifier::Single(PRODUCT.into()), Some("1.0"), None));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = evaluate_installed(&products, PRODUCT, &cancel, &NoProgress).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_progress_steps() {
        let products = StaticProducts::new()
            .with("a", ProductRecord::default())
            .with("b", ProductRecord::default())
            .with("c", ProductRecord::default())
            .with("d", ProductRecord::default());
        let seen = Mutex::new(Vec::new());
        let sink = |v: f32| seen.lock().unwrap().push(v);
        evaluate_installed(&products, PRODUCT, &CancellationToken::new(), &sink).unwrap();
        assert_eq!(seen.into_inner().unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    struct Failing;

    impl InstalledProducts for Failing {
        fn keys(&self) -> Result<Vec<String>> {
            Err(Error::Enumeration(std::io::Error::other("access denied")))
        }

        fn read(&self, _key: &str) -> Option<ProductRecord> { None }
    }

    #[test]
    fn test_enumeration_failure() {
        let err = evaluate_installed(&Failing, PRODUCT, &CancellationToken::new(), &NoProgress)
            .unwrap_err();
        assert!(matches!(err, Error::Enumeration(_)));
    }
}
