pub type Lit = i32;

pub type Var = usize;

pub type Clause = Vec<Lit>;

pub fn to_var(lit: Lit) -> Var {
    debug_assert_ne!(lit, 0);
    lit.unsigned_abs() as Var
}

/// Outcome of a `solve` call, encoded the way SAT competitions expect it in the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Sat,
    Unsat,
    Unknown,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Sat => 10,
            Status::Unsat => 20,
            Status::Unknown => 0,
        }
    }
}
