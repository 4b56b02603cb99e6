//! JSON server and client implementations over an exchange. The server owns all input validation
//! and error-code mapping so that exchanges only ever see already-validated primitives.
pub mod gbce_v1;
