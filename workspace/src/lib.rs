//! Repository hygiene checks, run as the `checks` test of this package.
