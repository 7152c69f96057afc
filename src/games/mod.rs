pub mod doudizhu;
