// Handler tests driven against the domain mock services
