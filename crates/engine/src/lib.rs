pub use commands::{
    BankDepositCmd, CancelShiftCmd, ConfirmHandoverCmd, CreateHandoverCmd, EndShiftCmd,
    ResolveDisputeCmd, StartShiftCmd,
};
pub use error::EngineError;
pub use handovers::{CashHandover, HandoverStatus, HandoverType};
pub use money::MoneyCents;
pub use ops::{Actor, CashFlowSummary, Engine, EngineBuilder, ShiftListFilter};
pub use readings::ReadingAggregate;
pub use roles::Role;
pub use shifts::{Shift, ShiftStatus, ShiftType};
pub use tolerance::{TolerancePolicy, variance};

mod commands;
mod error;
mod handovers;
mod money;
mod ops;
mod readings;
mod roles;
mod shifts;
mod stations;
mod tolerance;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
