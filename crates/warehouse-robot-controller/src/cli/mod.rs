/*
[INPUT]:  Terminal input
[OUTPUT]: Session commands
[POS]:    CLI module root
[UPDATE]: When adding CLI flows
*/

pub mod interactive;
