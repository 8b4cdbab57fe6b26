//! Delivery status ids and the guard applied before a status change is recorded.

use crate::error::AppError;

pub const PENDING: i32 = 1;
pub const PREPARING: i32 = 2;
pub const TRACKING_NUMBER_POSTED: i32 = 3;
pub const DELIVERED: i32 = 4;
pub const CANCELLED: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentDelivery<'a> {
    pub status_id: i32,
    pub tracking_number: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status_id: i32,
    /// Tracking number the delivery carries after the change.
    pub tracking_number: Option<String>,
    pub restock: bool,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decide the delivery row after a requested change, or reject it.
pub fn plan_status_change(
    current: &CurrentDelivery<'_>,
    requested_status: i32,
    requested_tracking: Option<&str>,
) -> Result<StatusChange, AppError> {
    let new_tracking = non_blank(requested_tracking);
    let tracking_number = new_tracking
        .clone()
        .or_else(|| non_blank(current.tracking_number));

    if requested_status == TRACKING_NUMBER_POSTED && tracking_number.is_none() {
        return Err(AppError::BadRequest(
            "tracking number is required for status 'Tracking number posted'".into(),
        ));
    }

    let tracking_changed =
        new_tracking.is_some() && new_tracking.as_deref() != current.tracking_number;
    if requested_status == current.status_id && !tracking_changed {
        return Err(AppError::BadRequest(
            "delivery already has this status".into(),
        ));
    }

    if current.status_id == CANCELLED && requested_status != CANCELLED {
        return Err(AppError::BadRequest(
            "cancelled orders cannot be reopened".into(),
        ));
    }

    Ok(StatusChange {
        status_id: requested_status,
        tracking_number,
        restock: requested_status == CANCELLED && current.status_id != CANCELLED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> CurrentDelivery<'static> {
        CurrentDelivery {
            status_id: PENDING,
            tracking_number: None,
        }
    }

    #[test]
    fn tracking_status_requires_a_number() {
        let err = plan_status_change(&pending(), TRACKING_NUMBER_POSTED, None).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = plan_status_change(&pending(), TRACKING_NUMBER_POSTED, Some("   ")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn new_tracking_number_is_accepted() {
        let change =
            plan_status_change(&pending(), TRACKING_NUMBER_POSTED, Some(" LBC-001 ")).unwrap();
        assert_eq!(change.tracking_number.as_deref(), Some("LBC-001"));
        assert!(!change.restock);
    }

    #[test]
    fn existing_tracking_number_satisfies_the_guard() {
        let current = CurrentDelivery {
            status_id: PREPARING,
            tracking_number: Some("JNT-77"),
        };
        let change = plan_status_change(&current, TRACKING_NUMBER_POSTED, None).unwrap();
        assert_eq!(change.tracking_number.as_deref(), Some("JNT-77"));
    }

    #[test]
    fn repeating_the_current_state_is_rejected() {
        let err = plan_status_change(&pending(), PENDING, None).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn correcting_the_tracking_number_is_a_change() {
        let current = CurrentDelivery {
            status_id: TRACKING_NUMBER_POSTED,
            tracking_number: Some("JNT-77"),
        };
        let change =
            plan_status_change(&current, TRACKING_NUMBER_POSTED, Some("JNT-78")).unwrap();
        assert_eq!(change.tracking_number.as_deref(), Some("JNT-78"));
    }

    #[test]
    fn cancelling_restocks_once() {
        let change = plan_status_change(&pending(), CANCELLED, None).unwrap();
        assert!(change.restock);
        let cancelled = CurrentDelivery {
            status_id: CANCELLED,
            tracking_number: None,
        };
        assert!(plan_status_change(&cancelled, DELIVERED, None).is_err());
    }
}
