mod address_space;
mod partition;
mod symtab;
