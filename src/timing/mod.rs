/// Effect timing options and their resolved form.
pub mod effect;
