//! `datetime.datetime` <-> UTC timestamps

use crate::exception::{self, PyError, PyException};
use crate::object::{Borrowed, PyRef};
use crate::runtime;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use pyhost_mainthread::Gil;
use pyo3::ffi;
use std::ptr;
use tracing::warn;

fn api(gil: Gil<'_>) -> Result<*mut ffi::PyDateTime_CAPI, PyError> {
    unsafe {
        if ffi::PyDateTimeAPI().is_null() {
            runtime::interp_state(gil)
                .map_err(|e| PyError::Exception(PyException::new(format!("ImportError: {}", e))))?;
        }
        Ok(ffi::PyDateTimeAPI())
    }
}

/// Naive `datetime` holding the UTC wall clock time of `t`, truncated to microseconds.
pub(super) fn to_py_datetime<'py>(gil: Gil<'py>, t: &DateTime<Utc>) -> Result<PyRef<'py>, PyError> {
    let api = api(gil)?;
    let naive = t.naive_utc();
    // Leap seconds are represented past 999_999us; the interpreter rejects that.
    let micros = (naive.nanosecond() / 1_000).min(999_999);
    unsafe {
        let ptr = ((*api).DateTime_FromDateAndTime)(
            naive.year(),
            naive.month() as i32,
            naive.day() as i32,
            naive.hour() as i32,
            naive.minute() as i32,
            naive.second() as i32,
            micros as i32,
            ffi::Py_None(),
            (*api).DateTimeType,
        );
        PyRef::from_owned_ptr_or_err(gil, ptr)
    }
}

pub(super) fn is_datetime(obj: Borrowed<'_, '_>) -> bool {
    match api(obj.gil()) {
        Ok(api) if !api.is_null() => unsafe { ffi::PyDateTime_CheckExact(obj.as_ptr()) != 0 },
        _ => false,
    }
}

/// Read the calendar fields of a `datetime` and normalize to UTC.
///
/// An aware datetime is shifted by its `utcoffset()`. When that call fails or
/// does not return a `timedelta`, the wall clock time is used unshifted and a
/// warning is logged.
pub(super) fn from_py_datetime(obj: Borrowed<'_, '_>) -> Result<DateTime<Utc>, PyError> {
    let o = obj.as_ptr();
    let naive = unsafe {
        NaiveDate::from_ymd_opt(
            ffi::PyDateTime_GET_YEAR(o),
            ffi::PyDateTime_GET_MONTH(o) as u32,
            ffi::PyDateTime_GET_DAY(o) as u32,
        )
        .and_then(|d| {
            d.and_hms_micro_opt(
                ffi::PyDateTime_DATE_GET_HOUR(o) as u32,
                ffi::PyDateTime_DATE_GET_MINUTE(o) as u32,
                ffi::PyDateTime_DATE_GET_SECOND(o) as u32,
                ffi::PyDateTime_DATE_GET_MICROSECOND(o) as u32,
            )
        })
    };
    let naive = naive.ok_or_else(|| {
        PyError::Exception(PyException::new(
            "ValueError: datetime fields out of range",
        ))
    })?;
    let wall = Utc.from_utc_datetime(&naive);

    let has_tz = unsafe { ffi::PyDateTime_DATE_GET_TZINFO(o) != ffi::Py_None() };
    if !has_tz {
        return Ok(wall);
    }
    match utc_offset(obj) {
        Some(offset) => Ok(wall - offset),
        None => {
            warn!(
                "cannot read utcoffset() of {}; using the wall clock time as UTC",
                obj.type_name()
            );
            Ok(wall)
        }
    }
}

fn utc_offset(obj: Borrowed<'_, '_>) -> Option<Duration> {
    let gil = obj.gil();
    let method = match obj.getattr("utcoffset") {
        Ok(m) => m,
        Err(_) => return None,
    };
    let delta = unsafe {
        PyRef::from_owned_ptr(gil, ffi::PyObject_CallObject(method.as_ptr(), ptr::null_mut()))
    };
    let delta = match delta {
        Some(d) => d,
        None => {
            // discard the pending exception
            let _ = exception::fetch(gil);
            return None;
        }
    };
    unsafe {
        // tzinfo.utcoffset() may return None, meaning the time is naive.
        if delta.borrow().is_none() {
            return Some(Duration::zero());
        }
        if ffi::PyDelta_CheckExact(delta.as_ptr()) == 0 {
            return None;
        }
        let p = delta.as_ptr();
        Some(
            Duration::days(ffi::PyDateTime_DELTA_GET_DAYS(p) as i64)
                + Duration::seconds(ffi::PyDateTime_DELTA_GET_SECONDS(p) as i64)
                + Duration::microseconds(ffi::PyDateTime_DELTA_GET_MICROSECONDS(p) as i64),
        )
    }
}
