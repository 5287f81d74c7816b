/*! Integration tests for Instructable.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * - authz: the admin gate in front of every directory operation
 * - listing: search, role filters, clearing and pagination of the directory
 * - editing: the profile edit workflow (view, validate, save or reject)
 * - sign_in: password authentication and actor resolution
 * - stores: behavior every `UserStore` implementation must share
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("instructable=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod authz;
mod helpers;
mod listing;
mod sign_in;
mod stores;
