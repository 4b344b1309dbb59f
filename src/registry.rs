//! Scheme-based driver dispatch, for applications that want to build a
//! pool straight from a URL without naming the driver type.
//!
//! Grounded in `sqlx-core`'s `any` backend (`install_drivers`/`from_url`):
//! a small global table mapping URL scheme to an installed [`Driver`].
//! Entirely optional — [`crate::pool::PoolOptions::build`] takes an
//! explicit `Arc<dyn Driver>` and never consults this registry itself.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::driver::Driver;
use crate::error::Error;
use crate::Result;

static DRIVERS: Lazy<RwLock<HashMap<&'static str, Arc<dyn Driver>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers `driver` under every scheme it reports via
/// [`Driver::url_schemes`]. Later registrations for the same scheme
/// replace earlier ones.
pub fn install_driver(driver: Arc<dyn Driver>) {
    let mut table = DRIVERS.write().expect("driver registry poisoned");
    for scheme in driver.url_schemes() {
        table.insert(*scheme, driver.clone());
    }
}

/// Looks up the driver registered for `scheme`.
pub fn driver_for_scheme(scheme: &str) -> Option<Arc<dyn Driver>> {
    DRIVERS.read().expect("driver registry poisoned").get(scheme).cloned()
}

/// Resolves a driver from a connection URL's scheme.
pub fn driver_for_url(url: &str) -> Result<Arc<dyn Driver>> {
    let parsed = url::Url::parse(url)?;
    driver_for_scheme(parsed.scheme())
        .ok_or_else(|| Error::DriverOpen(format!("no driver installed for scheme {:?}", parsed.scheme())))
}

/// Convenience mirroring the original `Connection_isSupported`: true if
/// some installed driver claims `scheme`.
pub fn is_supported(scheme: &str) -> bool {
    driver_for_scheme(scheme).is_some()
}
