pub mod reconciler_svc;
