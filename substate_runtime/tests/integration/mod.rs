mod end_to_end;
mod hooks;
mod scheduled_run;
mod stop_resume;
