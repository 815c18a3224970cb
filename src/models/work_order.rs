//! Status de la ordem de serviço
//!
//! Este módulo define el enum de status con su máquina de estados
//! (transición única hacia adelante) y las tablas de progreso/descripción.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status de una ordem de serviço. Secuencia lineal cerrada:
/// RECEIVED -> DIAGNOSING -> AWAITING_APPROVAL -> IN_PROGRESS -> FINISHED -> DELIVERED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Received,
    Diagnosing,
    AwaitingApproval,
    InProgress,
    Finished,
    Delivered,
}

impl WorkOrderStatus {
    /// Todos los status, en orden del ciclo de vida.
    pub const ALL: [WorkOrderStatus; 6] = [
        WorkOrderStatus::Received,
        WorkOrderStatus::Diagnosing,
        WorkOrderStatus::AwaitingApproval,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::Finished,
        WorkOrderStatus::Delivered,
    ];

    /// Único status siguiente permitido. `None` para DELIVERED (terminal).
    pub fn next(self) -> Option<WorkOrderStatus> {
        match self {
            WorkOrderStatus::Received => Some(WorkOrderStatus::Diagnosing),
            WorkOrderStatus::Diagnosing => Some(WorkOrderStatus::AwaitingApproval),
            WorkOrderStatus::AwaitingApproval => Some(WorkOrderStatus::InProgress),
            WorkOrderStatus::InProgress => Some(WorkOrderStatus::Finished),
            WorkOrderStatus::Finished => Some(WorkOrderStatus::Delivered),
            WorkOrderStatus::Delivered => None,
        }
    }

    /// Validar una transición contra la tabla. Self-transiciones son inválidas.
    pub fn can_transition_to(self, target: WorkOrderStatus) -> bool {
        self.next() == Some(target)
    }

    /// Porcentaje de progreso para el acompañamiento del cliente.
    pub fn progress(self) -> u8 {
        match self {
            WorkOrderStatus::Received => 10,
            WorkOrderStatus::Diagnosing => 30,
            WorkOrderStatus::AwaitingApproval => 50,
            WorkOrderStatus::InProgress => 70,
            WorkOrderStatus::Finished => 90,
            WorkOrderStatus::Delivered => 100,
        }
    }

    /// Descripción legible del status (en portugués, como el resto del dominio).
    pub fn description(self) -> &'static str {
        match self {
            WorkOrderStatus::Received => "Ordem recebida",
            WorkOrderStatus::Diagnosing => "Em diagnóstico",
            WorkOrderStatus::AwaitingApproval => "Aguardando aprovação",
            WorkOrderStatus::InProgress => "Em execução",
            WorkOrderStatus::Finished => "Finalizada",
            WorkOrderStatus::Delivered => "Entregue",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Received => "RECEIVED",
            WorkOrderStatus::Diagnosing => "DIAGNOSING",
            WorkOrderStatus::AwaitingApproval => "AWAITING_APPROVAL",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Finished => "FINISHED",
            WorkOrderStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(WorkOrderStatus::Received),
            "DIAGNOSING" => Ok(WorkOrderStatus::Diagnosing),
            "AWAITING_APPROVAL" => Ok(WorkOrderStatus::AwaitingApproval),
            "IN_PROGRESS" => Ok(WorkOrderStatus::InProgress),
            "FINISHED" => Ok(WorkOrderStatus::Finished),
            "DELIVERED" => Ok(WorkOrderStatus::Delivered),
            other => Err(format!("Status {} inválido para ordem de serviço", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_matches_the_transition_table() {
        use WorkOrderStatus::*;
        let allowed = [
            (Received, Diagnosing),
            (Diagnosing, AwaitingApproval),
            (AwaitingApproval, InProgress),
            (InProgress, Finished),
            (Finished, Delivered),
        ];

        for from in WorkOrderStatus::ALL {
            for to in WorkOrderStatus::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transición {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn delivered_is_terminal() {
        assert_eq!(WorkOrderStatus::Delivered.next(), None);
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in WorkOrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn progress_table() {
        use WorkOrderStatus::*;
        assert_eq!(Received.progress(), 10);
        assert_eq!(Diagnosing.progress(), 30);
        assert_eq!(AwaitingApproval.progress(), 50);
        assert_eq!(InProgress.progress(), 70);
        assert_eq!(Finished.progress(), 90);
        assert_eq!(Delivered.progress(), 100);
    }

    #[test]
    fn description_table() {
        use WorkOrderStatus::*;
        assert_eq!(Received.description(), "Ordem recebida");
        assert_eq!(Diagnosing.description(), "Em diagnóstico");
        assert_eq!(AwaitingApproval.description(), "Aguardando aprovação");
        assert_eq!(InProgress.description(), "Em execução");
        assert_eq!(Finished.description(), "Finalizada");
        assert_eq!(Delivered.description(), "Entregue");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in WorkOrderStatus::ALL {
            assert_eq!(status.as_str().parse::<WorkOrderStatus>(), Ok(status));
        }
        assert!("CANCELLED".parse::<WorkOrderStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&WorkOrderStatus::AwaitingApproval).unwrap();
        assert_eq!(json, "\"AWAITING_APPROVAL\"");
        let parsed: WorkOrderStatus = serde_json::from_str("\"IN_PROGRESS\"").unwrap();
        assert_eq!(parsed, WorkOrderStatus::InProgress);
    }
}
