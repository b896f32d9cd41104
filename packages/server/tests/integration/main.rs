mod helpers;

mod uploads;
