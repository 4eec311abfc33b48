mod h2;
mod sqlserver;
mod support;
