/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: HS256 bearer token validation
/// - [`middleware`]: resolves a bearer header into an [`middleware::AuthUser`]
/// - [`authorization`]: manager/member/author checks over loaded records
///
/// Passwords and token issuance belong to the account service and are not
/// handled here.

pub mod authorization;
pub mod jwt;
pub mod middleware;
