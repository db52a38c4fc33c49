mod receiver;
mod sim_time;
mod simulator;
mod tla;
