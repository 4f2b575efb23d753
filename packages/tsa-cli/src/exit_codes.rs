pub const SUCCESS: i32 = 0;
/// Analysis or I/O failed after inputs were accepted
pub const EXECUTION_ERROR: i32 = 1;
/// Bad arguments, unknown analysis or unusable series data
pub const INPUT_ERROR: i32 = 2;
/// Credential rejected by the Data API
pub const ACCESS_DENIED: i32 = 3;
/// Some batch items failed, others succeeded
pub const PARTIAL_FAILURE: i32 = 4;
