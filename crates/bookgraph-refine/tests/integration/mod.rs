mod refinement_loop;
mod refinement_session;
