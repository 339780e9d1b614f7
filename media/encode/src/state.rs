/*!
Encoder lifecycle.
*/

/**
Where an encoder is in its lifecycle.

An encoder accepts frames only while `Encoding`. `finish` flushes the
codec exactly once, passing through `Flushing` and ending in `Done`;
both encoding into and re-flushing a finished encoder are errors.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeState {
    Encoding,
    Flushing,
    Done,
}
