use tracing::debug;
use winreg::RegKey;
use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_32KEY, REG_MULTI_SZ, REG_SZ};

use crate::error::{Error, Result};
use crate::products::{InstalledProducts, ProductIdentifier, ProductRecord};

const UNINSTALL_KEY: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// `HKLM\...\Uninstall`, read through the 32-bit registry view.
#[derive(Debug, Default, Clone, Copy)]
pub struct UninstallRegistry;

impl UninstallRegistry {
    pub fn new() -> Self { Self }

    fn open(&self, path: &str) -> std::io::Result<RegKey> {
        RegKey::predef(HKEY_LOCAL_MACHINE).open_subkey_with_flags(path, KEY_READ | KEY_WOW64_32KEY)
    }
}

impl InstalledProducts for UninstallRegistry {
    fn keys(&self) -> Result<Vec<String>> {
        let root = self.open(UNINSTALL_KEY).map_err(Error::Enumeration)?;
        root.enum_keys()
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(Error::Enumeration)
    }

    fn read(&self, key: &str) -> Option<ProductRecord> {
        let record = match self.open(&format!(r"{UNINSTALL_KEY}\{key}")) {
            Ok(record) => record,
            Err(e) => {
                debug!(key, error = %e, "failed to open uninstall record");
                return None;
            }
        };

        Some(ProductRecord {
            upgrade_code:      upgrade_code(&record),
            primary_version:   record.get_value("BundleVersion").ok(),
            secondary_version: record.get_value("DisplayVersion").ok(),
        })
    }
}

fn upgrade_code(record: &RegKey) -> Option<ProductIdentifier> {
    let raw = record.get_raw_value("BundleUpgradeCode").ok()?;
    match raw.vtype {
        REG_SZ => record.get_value("BundleUpgradeCode").ok().map(ProductIdentifier::Single),
        REG_MULTI_SZ => record.get_value("BundleUpgradeCode").ok().map(ProductIdentifier::Multi),
        _ => None,
    }
}
