//! Notifiers that report a finished run.
//!
//! | Notifier | Module | Channel |
//! |----------|--------|---------|
//! | `wecom` | [`wecom`] | WeCom group-robot webhook |

pub mod wecom;
