
#[cfg(test)]
mod auth_tests;
#[cfg(test)]
mod user_tests;
#[cfg(test)]
mod multi_tenancy_tests;
