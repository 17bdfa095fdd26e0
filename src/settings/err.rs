// Codes used in log records for failures that are not part of the unified
// client-facing taxonomy.

// Error while checking request parameters.
pub const CD_VALIDATION: &str = "Validation";

// Request arrived without a usable session token.
pub const CD_NOT_LOGGED_IN: &str = "NotLoggedIn";
pub const MSG_TOKEN_MISSING: &str = "Session token not provided";
// Error when decoding token or expired token.
pub const MSG_INVALID_OR_EXPIRED_TOKEN: &str = "invalid_or_expired_token";

// An error occurred while executing a database query.
pub const CD_DATABASE: &str = "Database";
pub const MSG_DATABASE: &str = "Error while querying the database.";

// Error web::block for waiting for database query to complete.
pub const CD_BLOCKING: &str = "Blocking";
pub const MSG_BLOCKING: &str = "Error while blocking process.";

// Error creating password hash.
pub const CD_HASHING_PASSWD: &str = "HashingPassword";

// Error encoding the session token.
pub const CD_SESSION_TOKEN: &str = "SessionToken";
pub const MSG_SESSION_TOKEN_ENCODE: &str = "session_token_encode";

// The request body could not be parsed as JSON.
pub const CD_PARSE_BODY: &str = "ParseBody";
