//! Unified error codes for the Bistro server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Reservation errors
//! - 5xxx: Order errors
//! - 6xxx: Payment errors
//! - 7xxx: Menu errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the web dashboard and
/// the voice agent can branch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Business rule violation
    BusinessRuleViolation = 9,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin token required
    AdminRequired = 2003,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 4001,
    /// Reservation is cancelled and can no longer change
    ReservationCancelled = 4002,
    /// Reservation has already been cancelled
    ReservationAlreadyCancelled = 4003,
    /// Reservation has already been paid
    ReservationAlreadyPaid = 4004,
    /// Could not allocate a unique reservation number
    ReservationNumberExhausted = 4005,
    /// Party size out of range
    PartySizeInvalid = 4006,
    /// Requested time is outside opening hours
    ReservationOutsideHours = 4007,
    /// Requested time is in the past
    ReservationInPast = 4008,

    // ==================== 5xxx: Order ====================
    /// Order not found
    OrderNotFound = 5001,
    /// Order has no items
    OrderEmpty = 5002,
    /// Order has already been paid
    OrderAlreadyPaid = 5003,
    /// Order is cancelled
    OrderCancelled = 5004,
    /// Order status transition not allowed
    OrderInvalidTransition = 5005,
    /// Order item is invalid (quantity, menu reference)
    OrderItemInvalid = 5006,

    // ==================== 6xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 6001,
    /// Payment amount is invalid
    PaymentAmountInvalid = 6002,
    /// Payment callback carried no reservation or order reference
    PaymentTargetMissing = 6003,
    /// No record holds the given payment intent
    PaymentIntentNotFound = 6004,
    /// Payment gateway returned an error
    PaymentGatewayError = 6005,
    /// Gateway webhook signature missing or wrong
    WebhookSignatureInvalid = 6006,

    // ==================== 7xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 7001,
    /// Menu item is not available
    MenuItemUnavailable = 7002,
    /// Menu item has invalid price
    MenuItemInvalidPrice = 7003,
    /// Menu item name already exists
    MenuItemNameExists = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// SMS / notification delivery failed
    NotificationFailed = 9101,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::BusinessRuleViolation => "Business rule violation",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator access is required",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationCancelled => "Reservation is cancelled",
            ErrorCode::ReservationAlreadyCancelled => "Reservation has already been cancelled",
            ErrorCode::ReservationAlreadyPaid => "Reservation has already been paid",
            ErrorCode::ReservationNumberExhausted => "Could not allocate a reservation number",
            ErrorCode::PartySizeInvalid => "Party size must be between 1 and 20",
            ErrorCode::ReservationOutsideHours => "Requested time is outside opening hours",
            ErrorCode::ReservationInPast => "Requested time is in the past",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderCancelled => "Order is cancelled",
            ErrorCode::OrderInvalidTransition => "Order status transition not allowed",
            ErrorCode::OrderItemInvalid => "Order item is invalid",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentAmountInvalid => "Payment amount is invalid",
            ErrorCode::PaymentTargetMissing => "Payment does not reference a reservation or order",
            ErrorCode::PaymentIntentNotFound => "No reservation or order holds this payment",
            ErrorCode::PaymentGatewayError => "Payment gateway error",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",
            ErrorCode::MenuItemInvalidPrice => "Menu item has invalid price",
            ErrorCode::MenuItemNameExists => "Menu item name already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NotificationFailed => "Notification delivery failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::BusinessRuleViolation),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // Reservation
            4001 => Ok(ErrorCode::ReservationNotFound),
            4002 => Ok(ErrorCode::ReservationCancelled),
            4003 => Ok(ErrorCode::ReservationAlreadyCancelled),
            4004 => Ok(ErrorCode::ReservationAlreadyPaid),
            4005 => Ok(ErrorCode::ReservationNumberExhausted),
            4006 => Ok(ErrorCode::PartySizeInvalid),
            4007 => Ok(ErrorCode::ReservationOutsideHours),
            4008 => Ok(ErrorCode::ReservationInPast),

            // Order
            5001 => Ok(ErrorCode::OrderNotFound),
            5002 => Ok(ErrorCode::OrderEmpty),
            5003 => Ok(ErrorCode::OrderAlreadyPaid),
            5004 => Ok(ErrorCode::OrderCancelled),
            5005 => Ok(ErrorCode::OrderInvalidTransition),
            5006 => Ok(ErrorCode::OrderItemInvalid),

            // Payment
            6001 => Ok(ErrorCode::PaymentFailed),
            6002 => Ok(ErrorCode::PaymentAmountInvalid),
            6003 => Ok(ErrorCode::PaymentTargetMissing),
            6004 => Ok(ErrorCode::PaymentIntentNotFound),
            6005 => Ok(ErrorCode::PaymentGatewayError),
            6006 => Ok(ErrorCode::WebhookSignatureInvalid),

            // Menu
            7001 => Ok(ErrorCode::MenuItemNotFound),
            7002 => Ok(ErrorCode::MenuItemUnavailable),
            7003 => Ok(ErrorCode::MenuItemInvalidPrice),
            7004 => Ok(ErrorCode::MenuItemNameExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::NotificationFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
