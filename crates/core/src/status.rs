//! Status vocabulary for tickets and requisitions.
//!
//! Every enum here round-trips through its Spanish wire label, which is what
//! the database `CHECK` constraints and the JSON API use. Handlers parse the
//! stored label back into the enum instead of comparing strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! define_label_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire/database label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} '{other}'. Must be one of: {}",
                        $what,
                        [$($label),+].join(", ")
                    ))),
                }
            }
        }
    };
}

define_label_enum! {
    /// Ticket lifecycle status.
    TicketStatus ("ticket status") {
        Open = "Abierto",
        Assigned = "Asignado",
        InProgress = "En Progreso",
        RequiresApproval = "Requiere Aprobación",
        Resolved = "Resuelto",
        Closed = "Cerrado",
        Cancelled = "Cancelado",
    }
}

impl TicketStatus {
    /// Statuses exempt from overdue detection: the work is done or abandoned.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed | Self::Cancelled)
    }

    /// No transition leaves these statuses.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Whether entering this status stamps `resolved_at`.
    pub fn marks_resolution(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

define_label_enum! {
    /// Ticket priority. Drives the SLA due date (see [`crate::sla`]).
    TicketPriority ("priority") {
        Low = "Baja",
        Medium = "Media",
        High = "Alta",
        Urgent = "Urgente",
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        Self::Medium
    }
}

define_label_enum! {
    /// Requisition status, derived from its items except for `Rejected`.
    RequisitionStatus ("requisition status") {
        Pending = "Pendiente",
        Approved = "Aprobada",
        PartiallyApproved = "Parcialmente Aprobada",
        Completed = "Completada",
        Rejected = "Rechazada",
    }
}

define_label_enum! {
    /// Kind of an in-app notification.
    NotificationKind ("notification kind") {
        Ticket = "ticket",
    }
}

define_label_enum! {
    /// Kind of a calendar entry.
    ScheduleEventKind ("schedule event kind") {
        Shift = "shift",
        Ticket = "ticket",
        Task = "task",
    }
}
