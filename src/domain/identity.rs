use uuid::Uuid;

// Voting identity. Guests vote under a caller-generated opaque token that
// the server never issues or validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(Uuid),
    Guest(String),
}

// Authorship identity stored on a review; guest authorship is a display
// name, not the voting token, and two guests may share a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    User(Uuid),
    Guest(String),
}
