//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - state stack and transforms (q, Q, cm)
//! - `text` - text state, positioning and showing (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ")
//! - `xobject` - XObjects and inline images (Do, EI)

mod graphics_state;
mod text;
mod xobject;
